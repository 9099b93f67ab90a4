pub mod directory;
pub mod identity;
pub mod meter;
pub mod metrics;
pub mod providers;

pub use directory::{ApplicationDirectory, HttpDirectory};
pub use identity::{Auth0Client, IdentityProvider};
pub use meter::{HttpUsageMeter, UsageMeter};
pub use metrics::{get_metrics, init_metrics};
pub use providers::{
    EmailMessage, EmailProvider, EmailTemplate, MailgunProvider, MockEmailProvider,
    ProviderError, ProviderResponse, TemplateData,
};
