pub mod lister;
pub mod migration;
pub mod records;
pub mod retry;
pub mod source;
pub mod storage;

#[cfg(test)]
mod stub_http;
