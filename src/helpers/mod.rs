pub mod catalog_helpers;
pub mod thing_helpers;
pub mod user_helpers;

#[cfg(test)]
pub mod test_support;
