mod eligibility;
mod gas;
mod pipeline;
mod utils;
