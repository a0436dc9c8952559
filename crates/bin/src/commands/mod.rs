pub mod health;
pub mod info;
pub mod serve;
pub mod users;
