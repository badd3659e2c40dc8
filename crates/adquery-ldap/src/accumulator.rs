//! Query result accumulation
//!
//! One [`QueryAccumulator`] exists per top-level query. The top-level page
//! loop and every range sub-search it spawns write into it; only the
//! top-level caller reads it, once its own loop is done.

use std::collections::HashMap;

use adquery_core::error::{QueryError, QueryResult};
use adquery_core::ids::QueryId;
use adquery_core::value::{AttributeData, AttributeValue, DirectoryEntry};

use crate::range::AttributeRange;

/// Values collected so far for one attribute of one entry.
#[derive(Debug)]
struct AttributeSlot {
    /// Name as first returned by the server, without options.
    name: String,
    values: Vec<AttributeValue>,
    /// Low bound the next range slice must start at.
    next_low: Option<u32>,
    /// False while range slices are still outstanding.
    complete: bool,
    partial: bool,
    range_requests: u32,
}

impl AttributeSlot {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
            next_low: None,
            complete: true,
            partial: false,
            range_requests: 0,
        }
    }
}

#[derive(Debug)]
struct EntryBuilder {
    dn: String,
    order: Vec<String>,
    slots: HashMap<String, AttributeSlot>,
}

impl EntryBuilder {
    fn new(dn: &str) -> Self {
        Self {
            dn: dn.to_string(),
            order: Vec::new(),
            slots: HashMap::new(),
        }
    }

    fn slot_mut(&mut self, name: &str) -> &mut AttributeSlot {
        let key = name.to_ascii_lowercase();
        if !self.slots.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.slots
            .entry(key)
            .or_insert_with(|| AttributeSlot::new(name))
    }

    fn slot(&self, name: &str) -> Option<&AttributeSlot> {
        self.slots.get(&name.to_ascii_lowercase())
    }

    fn build(mut self) -> DirectoryEntry {
        let mut entry = DirectoryEntry::new(self.dn);
        for key in self.order {
            if let Some(slot) = self.slots.remove(&key) {
                if slot.partial {
                    entry.partial_attributes.push(slot.name.clone());
                }
                entry
                    .attributes
                    .insert(slot.name, AttributeData::from_values(slot.values));
            }
        }
        entry
    }
}

/// Entries under construction for one query, keyed by DN.
///
/// DNs and attribute names are matched without regard to ASCII case.
#[derive(Debug)]
pub struct QueryAccumulator {
    query_id: QueryId,
    order: Vec<String>,
    entries: HashMap<String, EntryBuilder>,
}

impl QueryAccumulator {
    /// Create an empty accumulator for `query_id`.
    pub fn new(query_id: QueryId) -> Self {
        Self {
            query_id,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    /// Number of distinct entries seen so far.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Reject writes that belong to another query.
    pub fn check_query(&self, query_id: QueryId) -> QueryResult<()> {
        if query_id == self.query_id {
            Ok(())
        } else {
            Err(QueryError::AccumulatorMismatch {
                expected: self.query_id,
                actual: query_id,
            })
        }
    }

    fn entry_mut(&mut self, dn: &str) -> &mut EntryBuilder {
        let key = dn.to_ascii_lowercase();
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries
            .entry(key)
            .or_insert_with(|| EntryBuilder::new(dn))
    }

    fn slot(&self, dn: &str, attribute: &str) -> Option<&AttributeSlot> {
        self.entries
            .get(&dn.to_ascii_lowercase())
            .and_then(|entry| entry.slot(attribute))
    }

    /// Register an entry so it is yielded even if it carries no attributes.
    pub fn add_entry(&mut self, query_id: QueryId, dn: &str) -> QueryResult<()> {
        self.check_query(query_id)?;
        self.entry_mut(dn);
        Ok(())
    }

    /// Append formatted values to an attribute slot.
    ///
    /// With a `range`, the slice must start where the previous slice of the
    /// same attribute ended; the first slice may start anywhere.
    pub fn merge(
        &mut self,
        query_id: QueryId,
        dn: &str,
        attribute: &str,
        values: Vec<AttributeValue>,
        range: Option<AttributeRange>,
    ) -> QueryResult<()> {
        self.check_query(query_id)?;
        let slot = self.entry_mut(dn).slot_mut(attribute);

        match range {
            Some(range) => {
                if let Some(expected) = slot.next_low {
                    if range.low != expected {
                        return Err(QueryError::RangeOutOfOrder {
                            dn: dn.to_string(),
                            attribute: attribute.to_string(),
                            low: range.low,
                            expected,
                        });
                    }
                }
                slot.next_low = range.high.map(|high| high.saturating_add(1));
                slot.complete = range.is_final();
            }
            None => {
                slot.next_low = None;
                slot.complete = true;
            }
        }

        slot.values.extend(values);
        Ok(())
    }

    /// Check if no range slices are outstanding for an attribute.
    pub fn is_complete(&self, dn: &str, attribute: &str) -> bool {
        self.slot(dn, attribute).map_or(false, |slot| slot.complete)
    }

    /// Check if range retrieval for an attribute was given up.
    pub fn is_partial(&self, dn: &str, attribute: &str) -> bool {
        self.slot(dn, attribute).map_or(false, |slot| slot.partial)
    }

    /// Flag an attribute as holding only the slices merged so far.
    pub fn mark_partial(&mut self, dn: &str, attribute: &str) {
        let slot = self.entry_mut(dn).slot_mut(attribute);
        slot.partial = true;
        slot.complete = true;
        slot.next_low = None;
    }

    /// Count one more range follow-up for an attribute and return the total.
    pub fn record_range_request(&mut self, dn: &str, attribute: &str) -> u32 {
        let slot = self.entry_mut(dn).slot_mut(attribute);
        slot.range_requests += 1;
        slot.range_requests
    }

    /// Consume the accumulator, yielding entries in discovery order.
    pub fn into_entries(mut self) -> Vec<DirectoryEntry> {
        self.order
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .map(EntryBuilder::build)
            .collect()
    }
}
