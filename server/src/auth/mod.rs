pub mod credentials;
pub mod token;

pub use credentials::resolve;
pub use token::TokenSource;
