pub mod applicationdb;
#[allow(clippy::module_inception)]
pub mod db;
pub mod jobdb;
pub mod messagedb;
pub mod notificationdb;
pub mod userdb;

pub use db::DBClient;
