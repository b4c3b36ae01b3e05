pub mod appsettings;
pub mod battery;
pub mod clock;
pub mod console;
pub mod delivery;
pub mod reminder;
pub mod scheduling;
