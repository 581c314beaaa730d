//! Domain models for the OFB catalog.

pub mod application;
pub mod setting;
pub mod view;

pub use application::{
    Application, ApplicationPatch, ApplicationStatus, Locale, NewApplication, PublicCompany,
    PublishWindow, ReviewDecision, SubmitApplicationRequest,
};
pub use setting::ThemeSetting;
pub use view::{ApplicationView, NewView, TrackViewRequest};
