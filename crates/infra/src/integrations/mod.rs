//! External webservice integrations

pub mod teamsystem;
