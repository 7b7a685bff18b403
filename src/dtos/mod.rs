pub mod applicationdtos;
pub mod jobdtos;
pub mod messagedtos;
pub mod notificationdtos;
