pub mod applicant;
pub mod artifact;
pub mod assessment;
pub mod policy;
pub mod profile;
