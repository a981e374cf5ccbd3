use std::fmt;

use console_core::FileKind;
use console_logging::Redacted;
use reqwest::Method;

/// Backend endpoints the console calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListFiles(FileKind),
    Upload,
    DeleteFiles(FileKind),
    ConvertToExcel,
    ExecuteLegacy,
    ExecuteUseCases,
    RecordUseCases,
}

/// Which credential pair a call is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialTier {
    Standard,
    /// Destructive calls.
    Elevated,
}

impl Endpoint {
    pub fn method(self) -> Method {
        match self {
            Endpoint::ListFiles(_) => Method::GET,
            Endpoint::DeleteFiles(_) => Method::DELETE,
            Endpoint::Upload
            | Endpoint::ConvertToExcel
            | Endpoint::ExecuteLegacy
            | Endpoint::ExecuteUseCases
            | Endpoint::RecordUseCases => Method::POST,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ListFiles(FileKind::Source) => "/api/getAllSidefiles",
            Endpoint::ListFiles(FileKind::Converted) => "/api/getAllXlxfiles",
            Endpoint::Upload => "/api/uploadAction",
            Endpoint::DeleteFiles(FileKind::Source) => "/api/deleteAllSideFiles",
            Endpoint::DeleteFiles(FileKind::Converted) => "/upload/deleteAllXlxFiles",
            Endpoint::ConvertToExcel => "/api/convert-to-excel",
            Endpoint::ExecuteLegacy => "/api/executeUploadAction",
            Endpoint::ExecuteUseCases => "/execute/executeUseCases",
            Endpoint::RecordUseCases => "/api/recordUseCases",
        }
    }

    /// Authorization table. Keep every arm explicit so a new endpoint has to pick a tier.
    pub fn tier(self) -> CredentialTier {
        match self {
            Endpoint::DeleteFiles(_) => CredentialTier::Elevated,
            Endpoint::ListFiles(_)
            | Endpoint::Upload
            | Endpoint::ConvertToExcel
            | Endpoint::ExecuteLegacy
            | Endpoint::ExecuteUseCases
            | Endpoint::RecordUseCases => CredentialTier::Standard,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// HTTP Basic credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &Redacted(&self.password))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub standard: Credentials,
    pub elevated: Credentials,
}

impl CredentialSet {
    pub fn for_tier(&self, tier: CredentialTier) -> &Credentials {
        match tier {
            CredentialTier::Standard => &self.standard,
            CredentialTier::Elevated => &self.elevated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_deletes_are_elevated() {
        let all = [
            Endpoint::ListFiles(FileKind::Source),
            Endpoint::ListFiles(FileKind::Converted),
            Endpoint::Upload,
            Endpoint::DeleteFiles(FileKind::Source),
            Endpoint::DeleteFiles(FileKind::Converted),
            Endpoint::ConvertToExcel,
            Endpoint::ExecuteLegacy,
            Endpoint::ExecuteUseCases,
            Endpoint::RecordUseCases,
        ];
        for endpoint in all {
            let expect_elevated = endpoint.method() == Method::DELETE;
            assert_eq!(
                endpoint.tier() == CredentialTier::Elevated,
                expect_elevated,
                "{endpoint}"
            );
        }
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("user", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("user"));
        assert!(!printed.contains("hunter2"));
    }
}
