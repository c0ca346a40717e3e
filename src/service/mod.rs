pub mod activity;
pub mod business;
pub mod call_stats;
pub mod email;
pub mod lead_source;
pub mod mailer;
pub mod voice_ai;
