//! End-to-end scenarios: typed values, value shapes and result output.

mod common;

use base64::Engine;
use chrono::{TimeZone, Utc};

use adquery_core::prelude::*;
use adquery_ldap::{CancellationToken, DirectoryQuery, QueryOptions, SearchWarning};
use common::{spec, MockDirectory, MockEntry, BASE_DN};

const JDOE_CERT: &str = "MIIBhzCCASygAwIBAgIDGis8MAoGCCqGSM49BAMCMCExDTALBgNVBAMMBGpkb2UxEDAOBgNVBAoMB0V4YW1wbGUwHhcNMjYxMDE4MTA1ODE1WhcNMzYxMDE1MTA1ODE1WjAhMQ0wCwYDVQQDDARqZG9lMRAwDgYDVQQKDAdFeGFtcGxlMFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE5+89AL4lajXnisYcdYfB93VDmbjoXFYYsYB9xDYkwI2/Z70LEB72/NabI845MdIXpLK2Ie5kcrezUFoOMCdQF6NTMFEwHQYDVR0OBBYEFInDhs0hg5WHyrxCjfQLtdTe5S4HMB8GA1UdIwQYMBaAFInDhs0hg5WHyrxCjfQLtdTe5S4HMA8GA1UdEwEB/wQFMAMBAf8wCgYIKoZIzj0EAwIDSQAwRgIhAP8fEQzlTDuFOqLra7A/pSssLoXNdP3RrbBxW/+CeE1UAiEAvt3JVJQ286YwGM9pZLz49t720HK6Qhg415liGNWm75k=";

const JDOE_DN: &str = "CN=John Doe,OU=Users,DC=example,DC=com";

fn domain_user_sid() -> Vec<u8> {
    let mut sid = vec![0x01, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05];
    for sub in [21u32, 3_623_811_015, 3_361_044_348, 30_300_820, 1013] {
        sid.extend_from_slice(&sub.to_le_bytes());
    }
    sid
}

fn object_guid() -> Vec<u8> {
    vec![
        0x78, 0x56, 0x34, 0x12, 0xbc, 0x9a, 0xf0, 0xde, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde,
        0xf0,
    ]
}

fn jdoe() -> MockEntry {
    let cert = base64::engine::general_purpose::STANDARD
        .decode(JDOE_CERT)
        .unwrap();

    MockEntry::new(JDOE_DN)
        .attr("objectClass", ["top", "person", "organizationalPerson", "user"])
        .attr("cn", ["John Doe"])
        .attr("sAMAccountName", ["jdoe"])
        .attr("description", Vec::<String>::new())
        .attr("pwdLastSet", ["133497882000000000"])
        .attr("accountExpires", ["9223372036854775807"])
        .attr("lastLogonTimestamp", ["0"])
        .attr("whenCreated", ["20240115103000.0Z"])
        .binary("objectSid", vec![domain_user_sid()])
        .binary("objectGUID", vec![object_guid()])
        .binary("userCertificate", vec![cert])
        .binary("msDS-CustomBlob", vec![vec![0xfe; 16]])
        .attr("memberOf;x-custom", [format!("CN=Staff,OU=Groups,{}", BASE_DN)])
}

async fn lookup(directory: MockDirectory, options: QueryOptions) -> adquery_ldap::SearchResults {
    DirectoryQuery::new(directory)
        .with_options(options)
        .search(
            &spec().with_filter("(sAMAccountName=jdoe)"),
            &CancellationToken::new(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_user_entry_is_typed() {
    common::init_tracing();
    let results = lookup(MockDirectory::new(vec![jdoe()]), QueryOptions::default()).await;
    let entry = results.entry(JDOE_DN).unwrap();

    assert_eq!(entry.get_text("sAMAccountName"), Some("jdoe"));
    assert_eq!(entry.values("objectClass").len(), 4);
    assert!(entry.get("description").unwrap().is_no_value());

    let pwd_last_set = entry.get("pwdLastSet").and_then(AttributeData::as_single);
    assert_eq!(
        pwd_last_set.and_then(AttributeValue::as_timestamp),
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
    );

    let expires = entry.get("accountExpires").and_then(AttributeData::as_single);
    assert_eq!(expires.and_then(AttributeValue::as_integer), Some(i64::MAX));

    let never_logged_on = entry
        .get("lastLogonTimestamp")
        .and_then(AttributeData::as_single);
    assert_eq!(
        never_logged_on.and_then(AttributeValue::as_timestamp),
        Some(Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap())
    );

    let created = entry.get("whenCreated").and_then(AttributeData::as_single);
    assert_eq!(
        created.and_then(AttributeValue::as_timestamp),
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
    );

    let sid = entry.get("objectSid").and_then(AttributeData::as_single);
    assert_eq!(
        sid.and_then(AttributeValue::as_sid).map(ToString::to_string),
        Some("S-1-5-21-3623811015-3361044348-30300820-1013".to_string())
    );
    assert_eq!(sid.and_then(AttributeValue::as_sid).and_then(|s| s.rid()), Some(1013));

    let guid = entry.get("objectGUID").and_then(AttributeData::as_single);
    assert_eq!(
        guid.and_then(AttributeValue::as_guid).map(|g| g.to_string()),
        Some("12345678-9abc-def0-1234-56789abcdef0".to_string())
    );

    let cert = entry
        .get("userCertificate")
        .and_then(AttributeData::as_single)
        .and_then(AttributeValue::as_certificate)
        .unwrap();
    assert!(cert.subject.contains("CN=jdoe"));
    assert_eq!(cert.subject, cert.issuer);

    let blob = entry.get("msDS-CustomBlob").and_then(AttributeData::as_single);
    assert!(blob.and_then(AttributeValue::as_guid).is_some());
}

#[tokio::test]
async fn test_guid_heuristic_can_be_disabled() {
    let results = lookup(
        MockDirectory::new(vec![jdoe()]),
        QueryOptions::new().with_guid_detection(false),
    )
    .await;
    let entry = results.entry(JDOE_DN).unwrap();

    let blob = entry.get("msDS-CustomBlob").and_then(AttributeData::as_single);
    assert_eq!(blob.and_then(AttributeValue::as_bytes), Some(&[0xfe; 16][..]));

    // Known GUID attributes are decoded regardless.
    let guid = entry.get("objectGUID").and_then(AttributeData::as_single);
    assert!(guid.and_then(AttributeValue::as_guid).is_some());
}

#[tokio::test]
async fn test_unrecognized_option_is_kept_with_warning() {
    let results = lookup(MockDirectory::new(vec![jdoe()]), QueryOptions::default()).await;
    let entry = results.entry(JDOE_DN).unwrap();

    assert_eq!(
        entry.get_text("memberOf"),
        Some(format!("CN=Staff,OU=Groups,{}", BASE_DN).as_str())
    );
    assert_eq!(
        results.warnings,
        vec![SearchWarning::UnrecognizedOption {
            dn: JDOE_DN.to_string(),
            key: "memberOf;x-custom".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_results_serialize_to_json() {
    let results = lookup(MockDirectory::new(vec![jdoe()]), QueryOptions::default()).await;
    let json = serde_json::to_value(&results).unwrap();

    let entry = &json["entries"][0];
    assert_eq!(entry["dn"], JDOE_DN);
    assert_eq!(entry["attributes"]["cn"], "John Doe");
    assert_eq!(
        entry["attributes"]["objectSid"],
        "S-1-5-21-3623811015-3361044348-30300820-1013"
    );
    assert_eq!(
        entry["attributes"]["objectGUID"],
        "12345678-9abc-def0-1234-56789abcdef0"
    );
    assert_eq!(entry["attributes"]["accountExpires"], i64::MAX);
    assert!(entry["attributes"]["objectClass"].is_array());
    assert!(entry.get("partial_attributes").is_none());

    assert_eq!(json["warnings"][0]["kind"], "unrecognized_option");
}

#[tokio::test]
async fn test_small_slices_merge_into_one_entry() {
    let group = MockEntry::new(format!("CN=Staff,OU=Groups,{}", BASE_DN))
        .attr("member", common::member_dns(30));
    let directory = MockDirectory::new(vec![group]).with_max_value_range(10);

    let results = DirectoryQuery::new(directory.clone())
        .search(&spec(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.entries.len(), 1);
    assert_eq!(results.entries[0].values("member").len(), 30);
    assert!(results
        .entry(&format!("cn=staff,ou=groups,{}", BASE_DN.to_lowercase()))
        .is_some());
}
