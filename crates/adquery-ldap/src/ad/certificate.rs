//! X.509 certificate decoding for `userCertificate` and friends.

use adquery_core::value::CertificateInfo;
use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

/// Decode a DER certificate into a summary.
///
/// Returns `None` when the bytes are not a well-formed certificate or carry
/// trailing data.
pub fn decode_certificate(der: &[u8]) -> Option<CertificateInfo> {
    let (rest, cert) = X509Certificate::from_der(der).ok()?;
    if !rest.is_empty() {
        return None;
    }

    let validity = cert.validity();
    Some(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.raw_serial_as_string(),
        not_before: to_utc(validity.not_before)?,
        not_after: to_utc(validity.not_after)?,
        der: der.to_vec(),
    })
}

fn to_utc(time: ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad::fixtures::jdoe_der;
    use chrono::TimeZone;

    #[test]
    fn test_decode_certificate() {
        let der = jdoe_der();
        let info = decode_certificate(&der).unwrap();

        assert!(info.subject.contains("CN=jdoe"));
        assert!(info.subject.contains("O=Example"));
        assert_eq!(info.subject, info.issuer);
        assert_eq!(info.serial, "1a:2b:3c");
        assert_eq!(
            info.not_before,
            Utc.with_ymd_and_hms(2026, 10, 18, 10, 58, 15).unwrap()
        );
        assert_eq!(
            info.not_after,
            Utc.with_ymd_and_hms(2036, 10, 15, 10, 58, 15).unwrap()
        );
        assert_eq!(info.der, der);
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut der = jdoe_der();
        der.push(0);
        assert!(decode_certificate(&der).is_none());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode_certificate(&[]).is_none());
        assert!(decode_certificate(&[0x30, 0x03, 0x02, 0x01, 0x01]).is_none());
        assert!(decode_certificate(b"-----BEGIN CERTIFICATE-----").is_none());
    }
}
