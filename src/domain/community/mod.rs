//! Community content: events, news and tags.

mod events;
mod news;
mod tags;

pub use events::{CommunityEvent, EventDraft};
pub use news::{LinkPreview, NewsDraft, NewsPost, UploadedImage};
pub use tags::{Tag, TagDraft};
