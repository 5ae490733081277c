pub mod errors;
pub mod db;
pub mod app_user;

#[cfg(test)]
mod tests;
