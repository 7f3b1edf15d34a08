pub mod capture;
pub mod device;

#[cfg(test)]
pub(crate) mod scripted;
