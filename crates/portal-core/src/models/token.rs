use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::ReportError;

/// Length in hex characters of a submission token (128 bits).
pub const TOKEN_LEN: usize = 32;

/// Opaque, unguessable identity of one logical submission batch.
///
/// The token is never stored locally. Its only record is the `uniqid` field
/// embedded in the remote task's custom metadata, which makes it the
/// capability that later unlocks the task's report.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionToken(String);

impl SubmissionToken {
    /// Parse a token: exactly 32 ASCII hex digits.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == TOKEN_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub(crate) fn from_hex(hex: String) -> Self {
        debug_assert_eq!(hex.len(), TOKEN_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a candidate string.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are capabilities; keep them out of debug logs.
impl fmt::Debug for SubmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubmissionToken({}..)", &self.0[..4.min(self.0.len())])
    }
}

/// Client-visible capability: `token || lowercase-hex(task_id)`, no padding.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId {
    token: SubmissionToken,
    task_id: u64,
}

impl CorrelationId {
    pub fn compose(token: &SubmissionToken, task_id: u64) -> Self {
        Self {
            token: token.clone(),
            task_id,
        }
    }

    /// Strict parse: a valid token followed by a hex task id.
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let task_id = parse_task_id(raw)?;
        let token = SubmissionToken::parse(token_part(raw)).ok_or(ReportError::InvalidTaskId)?;
        Ok(Self { token, task_id })
    }

    pub fn token(&self) -> &SubmissionToken {
        &self.token
    }

    pub fn task_id(&self) -> u64 {
        self.task_id
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:x}", self.token, self.task_id)
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationId")
            .field("token", &self.token)
            .field("task_id", &self.task_id)
            .finish()
    }
}

/// The leading token portion of a raw correlation id (empty if too short).
pub fn token_part(raw: &str) -> &str {
    raw.get(..TOKEN_LEN).unwrap_or("")
}

/// Decode the task id from everything after the token as hexadecimal.
pub fn parse_task_id(raw: &str) -> Result<u64, ReportError> {
    let hex = raw.get(TOKEN_LEN..).ok_or(ReportError::InvalidTaskId)?;
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ReportError::InvalidTaskId);
    }
    u64::from_str_radix(hex, 16).map_err(|_| ReportError::InvalidTaskId)
}
