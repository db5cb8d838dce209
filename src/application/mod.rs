// Application layer - Feed contract, event dispatch and display adaptation
pub mod dispatcher;
pub mod display;
pub mod feed_listener;
pub mod sensor_feed;
