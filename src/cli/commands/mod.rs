pub mod amazon;
pub mod db;
pub mod fields;
pub mod form;
pub mod install;
pub mod search;
pub mod token;

pub use amazon::AmazonCommands;
pub use db::DbCommands;
pub use fields::FieldsCommands;
pub use form::FormCommands;
pub use install::InstallArgs;
pub use search::SearchCommands;
pub use token::TokenCommands;
