//! Email marketing campaigns.
//!
//! Campaign lifecycle: `draft → scheduled/sending → sent`. Sending does not
//! talk to a mail server; it writes one pending outbox row per recipient for
//! a separate delivery consumer.

pub mod campaign;
pub mod outbox;
pub mod template;

pub use campaign::{Campaign, CampaignDraft, CampaignStatus, CampaignUpdate};
pub use outbox::{EmailStatus, OutboundEmail, Recipient, build_outbox};
pub use template::render_template;
