//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                    |
//! |----------------|--------------------|--------------------------------|
//! | `sim_gpio`     | GpioPort           | In-memory pin table            |
//! | `hal_gpio`     | GpioPort           | `embedded-hal` pins / PWM      |
//! | `flag_store`   | FlagStore          | JSON file                      |
//! | `log_sink`     | NotificationSink   | Log output                     |
//! | `sim_status`   | StatusQueryPort    | Fixed simulated device         |
//! | `trap_feed`    | (producer)         | NDJSON notifications on a pipe |

pub mod flag_store;
pub mod hal_gpio;
pub mod log_sink;
pub mod sim_gpio;
pub mod sim_status;
pub mod trap_feed;
