#![allow(missing_docs)]

pub(crate) mod backend;
pub(crate) mod html;

pub(crate) use backend::{spawn_fake_backend, unreachable_backend_url};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment, select_texts};
