//! Run-scoped deployment: gate, targets, notification, fan-out.

mod fanout;
mod gate;
mod notify;
mod targets;

pub use fanout::{PostSuccessReport, PostSuccessRunner};
pub use gate::{DeploymentGate, GateDecision, TagPattern};
pub use notify::{NotificationEvent, Notifier};
pub use targets::{CommandTarget, DeployReport, DeployStatus, DeployTarget};

#[cfg(feature = "http-delivery")]
pub use notify::WebhookNotifier;
#[cfg(feature = "http-delivery")]
pub use targets::WebhookTarget;
