pub mod utilization;
