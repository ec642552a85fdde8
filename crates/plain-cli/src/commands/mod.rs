//! Command handlers grouped by concern.

pub(crate) mod index;
pub(crate) mod sitemap;
