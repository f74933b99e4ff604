#![no_std]
#![no_main]

use core::fmt::Write as _;

use cortex_m_rt::entry;
use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::InterruptExecutor;
use embassy_rp::bind_interrupts;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{Async, Config as UartConfig, Uart, UartRx};
use heapless::Vec;
use serial_stream_rp2040::{pump_rx, EmbassyClock, RpUart, RxLink, Serial, TimedStream};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
});

/// Console baud rate (8N1).
const BAUD_RATE: u32 = 115_200;

/// Longest command word, e.g. `SCALE`.
const MAX_COMMAND_LEN: usize = 8;

/// Longest `ECHO` payload.
const MAX_ECHO_LEN: usize = 64;

/// Gain applied by the `SCALE` command.
const SCALE_GAIN: f32 = 2.5;

/// Receive state shared with the interrupt-priority pump.
static RX_LINK: RxLink = RxLink::new();

/// Executor for the receive pump; preempts the busy-waiting foreground.
static EXECUTOR_RX: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_RX.on_interrupt()
}

/// Receive task - moves every byte from UART1 into the shared link.
#[embassy_executor::task]
async fn rx_task(rx: UartRx<'static, Async>) {
    pump_rx(rx, &RX_LINK).await
}

#[entry]
fn main() -> ! {
    info!("serial-stream console starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BAUD_RATE;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();

    // --- Receive pump at interrupt priority ---
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner = EXECUTOR_RX.start(interrupt::SWI_IRQ_1);
    spawner.spawn(rx_task(rx).unwrap());

    // --- Foreground console ---
    let mut serial = Serial::with_ring(RpUart::new(tx, &RX_LINK), RX_LINK.ring());
    serial.begin(BAUD_RATE);
    if serial.println("serial-stream ready").is_err() {
        warn!("banner not sent");
    }

    let mut stream = TimedStream::new(&mut serial, EmbassyClock::new());
    info!("console initialized, waiting for commands...");

    loop {
        // Commands look like `$ADD 2 40\n`; anything before `$` is noise.
        if !stream.find_until(b"$", b"\n") {
            continue;
        }

        let command: Vec<u8, MAX_COMMAND_LEN> = stream.read_until(b' ');
        let reply = match command.as_slice() {
            b"ADD" => {
                let a = stream.parse_int();
                let b = stream.parse_int();
                writeln!(stream.source_mut(), "{}\r", a.wrapping_add(b))
            }
            b"SCALE" => {
                let value = stream.parse_float();
                writeln!(stream.source_mut(), "{}\r", value * SCALE_GAIN)
            }
            b"ECHO" => {
                let text: Vec<u8, MAX_ECHO_LEN> = stream.read_until(b'\n');
                let port = stream.source_mut();
                port.write_bytes(&text)
                    .and_then(|_| port.write_bytes(b"\r\n"))
                    .map(|_| ())
                    .map_err(|_| core::fmt::Error)
            }
            b"STAT" => {
                let port = stream.source_mut();
                let overruns = port.overrun_count();
                let baud = port.baud_rate();
                writeln!(port, "baud={} overruns={}\r", baud, overruns)
            }
            _ => {
                warn!("unknown command: {=[u8]:a}", command.as_slice());
                writeln!(stream.source_mut(), "ERR\r")
            }
        };

        if reply.is_err() {
            warn!("reply not sent");
        }
    }
}
