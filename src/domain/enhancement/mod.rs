//! Enhancement module - turns a raw model reply into display content.

mod enhancer;
mod personality;

pub use enhancer::{EnhancementContext, ResponseEnhancer, REMARKS};
pub use personality::{PersonalityPicker, STARTERS};
