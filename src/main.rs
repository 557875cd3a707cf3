#![no_std]
#![no_main]

use bme680::{Bme680, I2CAddress, IIRFilterSize, OversamplingSetting, SettingsBuilder};
use bsp::entry;
use core::net::Ipv4Addr;
use defmt::*;
use defmt_rtt as _;
use ds323x::Ds323x;
use embedded_hal::delay::DelayNs;
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::SdCard;
use i2c_pio::I2C;
use lcd1602_rs::LCD1602;
use panic_probe as _;
use w5500::bus::FourWire;
use w5500::{MacAddress, Mode, UninitializedDevice};

// Provide an alias for our BSP so we can switch targets quickly.
use rp_pico as bsp;

use bsp::hal::{
    self,
    adc::{Adc, AdcPin},
    clocks::{init_clocks_and_plls, Clock},
    fugit::RateExtU32,
    gpio::{FunctionI2C, FunctionSpi, Pin, PullUp},
    pac,
    pio::PIOExt,
    spi::Spi,
    watchdog::Watchdog,
    Timer,
};
use plantcare_rs::board::{BoardClock, BoardSensors, LcdDisplay, Rtc, SdLog};
use plantcare_rs::clock::Monotonic;
use plantcare_rs::irrigation::RelayPin;
use plantcare_rs::net::NalChannel;
use plantcare_rs::{Controller, Settings};

/// Locally administered MAC for the W5500
const MAC: [u8; 6] = [0x02, 0x50, 0x4C, 0x41, 0x4E, 0x54];
const ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

#[entry]
fn main() -> ! {
    info!("PlantCare starting");
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // The default is to generate a 125 MHz system clock
    let clocks = init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let sio = hal::Sio::new(pac.SIO);
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let settings = Settings::default();

    // Set up BME680
    let (mut pio, sm0, _, _, _) = pac.PIO0.split(&mut pac.RESETS);
    let i2c_pio = I2C::new(
        &mut pio,
        pins.gpio8,
        pins.gpio9,
        sm0,
        100.kHz(),
        clocks.system_clock.freq(),
    );
    let mut bme = Bme680::init(i2c_pio, &mut timer, I2CAddress::Secondary).unwrap();
    let bme_settings = SettingsBuilder::new()
        .with_humidity_oversampling(OversamplingSetting::OS2x)
        .with_pressure_oversampling(OversamplingSetting::OS4x)
        .with_temperature_oversampling(OversamplingSetting::OS8x)
        .with_temperature_filter(IIRFilterSize::Size3)
        .with_run_gas(false)
        .build();
    bme.set_sensor_settings(&mut timer, bme_settings).unwrap();

    // Set up moisture probe and ranger
    let adc = Adc::new(pac.ADC, &mut pac.RESETS);
    let moisture = AdcPin::new(pins.gpio26.into_floating_input()).unwrap();
    let sensors = BoardSensors::new(
        adc,
        moisture,
        bme,
        pins.gpio6.into_push_pull_output(),
        pins.gpio7.into_pull_down_input(),
        timer,
    );

    // Set up DS3231
    let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio20.reconfigure();
    let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio21.reconfigure();
    let i2c0 = hal::I2C::i2c0(
        pac.I2C0,
        sda,
        scl,
        100.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );
    let rtc = Rtc::new(Ds323x::new_ds3231(i2c0));

    // Set up LCD1602
    let lcd = LCD1602::new(
        pins.gpio1.into_function(),
        pins.gpio0.into_function(),
        pins.gpio2.into_function(),
        pins.gpio3.into_function(),
        pins.gpio4.into_function(),
        pins.gpio5.into_function(),
        timer,
    )
    .unwrap();
    let display = LcdDisplay::new(lcd, pins.gpio15.into_push_pull_output());

    // Set up pump relay
    let relay = RelayPin::new(pins.gpio14.into_push_pull_output(), settings.relay_active_low).unwrap();

    // Set up SD card
    let sd_spi = Spi::<_, _, _, 8>::new(
        pac.SPI0,
        (
            pins.gpio19.into_function::<FunctionSpi>(),
            pins.gpio16.into_function::<FunctionSpi>(),
            pins.gpio18.into_function::<FunctionSpi>(),
        ),
    )
    .init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        400.kHz(),
        embedded_hal::spi::MODE_0,
    );
    let sd_device = ExclusiveDevice::new(sd_spi, pins.gpio17.into_push_pull_output(), timer).unwrap();
    let log = SdLog::new(SdCard::new(sd_device, timer));

    let mut controller = Controller::new(settings, rtc, sensors, relay, display, log);
    if let Err(e) = controller.startup() {
        error!("halting: {}", e);
        halt();
    }

    // Set up W5500 and sync the clock once
    let eth_spi = Spi::<_, _, _, 8>::new(
        pac.SPI1,
        (
            pins.gpio11.into_function::<FunctionSpi>(),
            pins.gpio12.into_function::<FunctionSpi>(),
            pins.gpio10.into_function::<FunctionSpi>(),
        ),
    )
    .init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        8.MHz(),
        embedded_hal::spi::MODE_0,
    );
    let eth_device = ExclusiveDevice::new(eth_spi, pins.gpio13.into_push_pull_output(), timer).unwrap();
    let mac = MacAddress::new(MAC[0], MAC[1], MAC[2], MAC[3], MAC[4], MAC[5]);
    match UninitializedDevice::new(FourWire::new(eth_device)).initialize_manual(mac, ADDRESS, Mode::default()) {
        Ok(stack) => {
            controller.notify("Network up");
            let mut channel = NalChannel::new(stack, BoardClock::new(timer));
            // Failure is reported by the controller; keep the RTC time
            let _ = controller.synchronize_clock(&mut channel);
        }
        Err(_) => {
            warn!("w5500: init failed");
            controller.notify("No network");
        }
    }

    let mut clock = BoardClock::new(timer);
    controller.begin(clock.now());
    info!("PlantCare ready");

    loop {
        controller.tick(clock.now());
        timer.delay_ms(10);
    }
}

/// Parks the core after a fatal startup error; the notice stays on screen
fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
