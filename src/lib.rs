// Library for tests to access modules

pub mod aggregate;
pub mod config;
pub mod history;
pub mod legend;
pub mod models;
pub mod pie;
pub mod poll;
pub mod rate;
pub mod series;
pub mod status;
pub mod units;
pub mod widget;
