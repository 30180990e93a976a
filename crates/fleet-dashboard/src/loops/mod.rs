//! Background loops driving the dashboard session.

pub mod flight_board_loop;
pub mod live_poll_loop;
pub mod replay_clock_loop;
pub mod replay_fetch;
