//! Attribute Syntax Definitions
//!
//! Well-known Active Directory attributes whose raw values need decoding
//! before they mean anything. Attributes not listed here pass through as
//! text.

/// How the raw values of an attribute are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSyntax {
    /// Integer count of 100 ns ticks since 1601-01-01 UTC.
    FileTime,
    /// Binary security identifier.
    Sid,
    /// DER-encoded X.509 certificate.
    Certificate,
    /// Opaque binary blob.
    Bytes,
    /// Generalized time string, `yyyyMMddHHmmss.fZ`.
    GeneralizedTime,
    /// Binary GUID in Windows byte order.
    Guid,
}

/// Well-known attributes and their syntax.
///
/// Format: (name, syntax)
pub const ATTRIBUTE_SYNTAXES: &[(&str, AttributeSyntax)] = &[
    // FILETIME large integers
    ("accountExpires", AttributeSyntax::FileTime),
    ("badPasswordTime", AttributeSyntax::FileTime),
    ("creationTime", AttributeSyntax::FileTime),
    ("lastLogoff", AttributeSyntax::FileTime),
    ("lastLogon", AttributeSyntax::FileTime),
    ("lastLogonTimestamp", AttributeSyntax::FileTime),
    ("lockoutTime", AttributeSyntax::FileTime),
    ("ms-Mcs-AdmPwdExpirationTime", AttributeSyntax::FileTime),
    ("msDS-LastSuccessfulInteractiveLogonTime", AttributeSyntax::FileTime),
    ("msDS-UserPasswordExpiryTimeComputed", AttributeSyntax::FileTime),
    ("msLAPS-PasswordExpirationTime", AttributeSyntax::FileTime),
    ("pwdLastSet", AttributeSyntax::FileTime),
    // Security identifiers
    ("mS-DS-CreatorSID", AttributeSyntax::Sid),
    ("objectSid", AttributeSyntax::Sid),
    ("securityIdentifier", AttributeSyntax::Sid),
    ("sIDHistory", AttributeSyntax::Sid),
    ("tokenGroups", AttributeSyntax::Sid),
    ("tokenGroupsGlobalAndUniversal", AttributeSyntax::Sid),
    // Certificates
    ("cACertificate", AttributeSyntax::Certificate),
    ("userCertificate", AttributeSyntax::Certificate),
    ("userSMIMECertificate", AttributeSyntax::Certificate),
    // Opaque binary
    ("dnsRecord", AttributeSyntax::Bytes),
    ("jpegPhoto", AttributeSyntax::Bytes),
    ("logonHours", AttributeSyntax::Bytes),
    ("msDS-AllowedToActOnBehalfOfOtherIdentity", AttributeSyntax::Bytes),
    ("msDS-GroupMSAMembership", AttributeSyntax::Bytes),
    ("msDS-ManagedPassword", AttributeSyntax::Bytes),
    ("msExchMailboxSecurityDescriptor", AttributeSyntax::Bytes),
    ("nTSecurityDescriptor", AttributeSyntax::Bytes),
    ("replPropertyMetaData", AttributeSyntax::Bytes),
    ("thumbnailPhoto", AttributeSyntax::Bytes),
    ("userPassword", AttributeSyntax::Bytes),
    // Generalized time
    ("createTimeStamp", AttributeSyntax::GeneralizedTime),
    ("dSCorePropagationData", AttributeSyntax::GeneralizedTime),
    ("modifyTimeStamp", AttributeSyntax::GeneralizedTime),
    ("msTSExpireDate", AttributeSyntax::GeneralizedTime),
    ("whenChanged", AttributeSyntax::GeneralizedTime),
    ("whenCreated", AttributeSyntax::GeneralizedTime),
    // GUIDs
    ("attributeSecurityGUID", AttributeSyntax::Guid),
    ("invocationId", AttributeSyntax::Guid),
    ("mS-DS-ConsistencyGuid", AttributeSyntax::Guid),
    ("msExchMailboxGuid", AttributeSyntax::Guid),
    ("msFVE-RecoveryGuid", AttributeSyntax::Guid),
    ("msFVE-VolumeGuid", AttributeSyntax::Guid),
    ("netbootGUID", AttributeSyntax::Guid),
    ("objectGUID", AttributeSyntax::Guid),
    ("schemaIDGUID", AttributeSyntax::Guid),
];

/// Get the syntax of a well-known attribute.
pub fn get_attribute_syntax(name: &str) -> Option<AttributeSyntax> {
    ATTRIBUTE_SYNTAXES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, syntax)| *syntax)
}
