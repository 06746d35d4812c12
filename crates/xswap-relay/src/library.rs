//! Send-library resolution.
//!
//! ```text
//! send_library(sender, dst_eid) ──none──▶ SendLibraryNotFound
//!        │
//!        ▼
//! message_lib_version(program)
//!        ├─ 0.0.2 ─▶ SimpleMessageLib
//!        ├─ 3.0.2 ─▶ Uln
//!        └─ other ─▶ UnsupportedMessageLibVersion
//! ```
//!
//! Both failures are configuration errors: retrying cannot fix them.

use std::fmt;

use serde::{Deserialize, Serialize};
use xswap_types::{MessageLibVersion, Pubkey, Result, XswapError};

use crate::client::EndpointReader;

/// Version reported by the simple (test) message library.
pub const SIMPLE_MESSAGE_LIB_VERSION: MessageLibVersion = MessageLibVersion {
    major: 0,
    minor: 0,
    endpoint_version: 2,
};

/// Version reported by the ultra-light-node library.
pub const ULN_VERSION: MessageLibVersion = MessageLibVersion {
    major: 3,
    minor: 0,
    endpoint_version: 2,
};

/// A resolved send library, by flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageLib {
    SimpleMessageLib(Pubkey),
    Uln(Pubkey),
}

impl MessageLib {
    /// Classify `program` by the version it reports.
    pub fn from_version(program: Pubkey, version: MessageLibVersion) -> Result<Self> {
        match version.as_tuple() {
            (0, 0, 2) => Ok(Self::SimpleMessageLib(program)),
            (3, 0, 2) => Ok(Self::Uln(program)),
            _ => Err(XswapError::UnsupportedMessageLibVersion {
                version: version.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn program(&self) -> Pubkey {
        match self {
            Self::SimpleMessageLib(p) | Self::Uln(p) => *p,
        }
    }

    #[must_use]
    pub fn version(&self) -> MessageLibVersion {
        match self {
            Self::SimpleMessageLib(_) => SIMPLE_MESSAGE_LIB_VERSION,
            Self::Uln(_) => ULN_VERSION,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleMessageLib(_) => "simple_message_lib",
            Self::Uln(_) => "uln",
        }
    }
}

impl fmt::Display for MessageLib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name(), self.program().short())
    }
}

/// Look up and classify the send library configured for `(sender, dst_eid)`.
pub async fn resolve_send_library<R: EndpointReader + ?Sized>(
    reader: &R,
    sender: &Pubkey,
    dst_eid: u32,
) -> Result<MessageLib> {
    let Some(program) = reader.send_library(sender, dst_eid).await? else {
        tracing::warn!(sender = %sender.short(), dst_eid, "no send library configured");
        return Err(XswapError::SendLibraryNotFound { dst_eid });
    };
    let version = reader.message_lib_version(&program).await?;
    let library = MessageLib::from_version(program, version).inspect_err(|_| {
        tracing::warn!(program = %program.short(), %version, "unsupported message library");
    })?;
    tracing::debug!(dst_eid, %library, "send library resolved");
    Ok(library)
}
