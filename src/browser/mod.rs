pub mod chrome;

pub use chrome::ChromeDocument;
