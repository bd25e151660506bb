mod google;
mod provider;

pub use google::GoogleCredentials;
pub use provider::{authorize, Authenticator, CredentialError, CredentialProvider, Token};

#[cfg(test)]
pub use provider::MockCredentialProvider;
