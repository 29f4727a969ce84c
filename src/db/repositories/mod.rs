pub mod access_codes;
pub mod bases;
pub mod captures;
pub mod games;
pub mod teams;
