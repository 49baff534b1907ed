//! Input schema definitions for Azure Red Hat OpenShift resources

mod openshift_cluster;

pub use openshift_cluster::{api_version, openshift_cluster_schema};
