//! # PixMatch API
//!
//! HTTP surface for the PixMatch search engine, built on actix-web.
//!
//! | Method | Path | Body / Query |
//! |--------|------|--------------|
//! | `POST` | `/search` | `multipart/form-data` (`image`, `tags`, `name`) or JSON `{url, tags}` |
//! | `POST` | `/search/filter` | JSON `{results, criteria}` |
//! | `GET` | `/featured` | `?count=N` |
//! | `GET` | `/categories` | |
//! | `GET` | `/health` | |

pub mod rest;

pub use rest::RestApi;
