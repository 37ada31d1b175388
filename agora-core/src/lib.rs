//! Agora Core - Entity Types and Domain Rules
//!
//! Data types shared by every Agora crate, the error taxonomy, and the
//! handful of pure rules (comment ranking, report enrichment, post quota,
//! connection state, input validation) that do not need I/O.

pub mod connections;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod membership;
pub mod moderation;
pub mod ranking;
pub mod validation;

pub use connections::{
    connect_state, connection_status, ConnectState, Connection, ConnectionStatus, PublicUser,
};
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
pub use membership::{price_in_cents, PostQuota, FREE_POST_LIMIT, MEMBERSHIP_PRICE_USD};
pub use moderation::{enrich_reports, EnrichedReport};
pub use ranking::{sort_comments, Votable};
pub use validation::{
    normalize_email, normalize_tag, require_text, validate_image, PostDraft, ValidPostDraft,
    ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES,
};
