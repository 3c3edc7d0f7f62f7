// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PISO-BOTE firmware entry point: board bring-up, then the cooperative polling loop.

#![cfg_attr(target_os = "none", no_std, no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::cell::RefCell;

    use cortex_m_rt::{entry, exception};
    use panic_halt as _;

    use hal::{
        i2c::{BlockingI2c, Mode as I2cMode},
        pac::{self, interrupt},
        prelude::*,
        serial::{Config, Serial},
        spi::{Mode, Phase, Polarity, Spi},
    };
    use stm32f7xx_hal as hal;

    use pisobote::actuators::ServoLids;
    use pisobote::config::MachineConfig;
    use pisobote::control::{FillMonitor, PulseGate};
    use pisobote::drivers::{lcd1602, HcSr04, Hx711, Lcd1602, Mfrc522, Servo, Sim800l};
    use pisobote::hw::adc::{channel, Adc1};
    use pisobote::hw::clock::{self, TimerDelay};
    use pisobote::hw::hopper::{self, Hopper};
    use pisobote::hw::pins::BoardPins;
    use pisobote::hw::pwm;
    use pisobote::hw::usart::{self, Usart};
    use pisobote::hw::{Led, StatusLight};
    use pisobote::machine::{Machine, Parts};
    use pisobote::sensing::{DigitalProbe, LampProbe, SensorFusion};
    use pisobote::ui::PinButtons;

    #[cfg(not(feature = "digital-presence"))]
    use pisobote::sensing::AnalogProbe;

    #[entry]
    fn main() -> ! {
        let cp = cortex_m::Peripherals::take().unwrap();
        let dp = pac::Peripherals::take().unwrap();
        let cfg = MachineConfig::default();

        // Clocks
        let rcc = dp.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(96.MHz()).freeze();
        let mut apb1 = rcc.apb1;
        let mut apb2 = rcc.apb2;
        let _syst = clock::init(cp.SYST, dp.TIM2, &clocks);

        let pins = BoardPins::new(
            dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE, dp.GPIOF, dp.GPIOG,
        );

        // USART3 (ST-LINK VCP) log console
        let usart_cfg = Config {
            baud_rate: 115_200.bps(),
            ..Default::default()
        };
        let console = Serial::new(dp.USART3, (pins.console.tx, pins.console.rx), &clocks, usart_cfg);
        usart::init_logger(Usart::new(console), log::LevelFilter::Info);
        log::info!("PISO-BOTE starting");

        // I2C1 LCD
        let i2c = BlockingI2c::i2c1(
            dp.I2C1,
            (pins.lcd.scl, pins.lcd.sda),
            I2cMode::standard(100.kHz()),
            &clocks,
            &mut apb1,
            10_000,
        );
        let mut lcd = Lcd1602::new(i2c, TimerDelay, lcd1602::DEFAULT_ADDRESS);
        if let Err(e) = lcd.init() {
            log::error!("{}", e);
            panic!("display init failed");
        }

        // Status LEDs
        let status = StatusLight::new(
            Led::active_high(pins.leds.green),
            Led::active_high(pins.leds.blue),
            Led::active_high(pins.leds.red),
            cfg.indicator,
        );

        // Chamber sensors
        let adc = RefCell::new(Adc1::new(dp.ADC1));
        #[cfg(not(feature = "digital-presence"))]
        let presence = AnalogProbe::new(Adc1::make_reader(&adc, channel::PRESENCE));
        #[cfg(feature = "digital-presence")]
        let presence = DigitalProbe::active_high(pins.sensors.presence);
        let metal = DigitalProbe::active_low(pins.sensors.metal);
        let weight = Hx711::new(pins.sensors.hx711_sck, pins.sensors.hx711_dout, TimerDelay);
        let light = LampProbe::new(Adc1::make_reader(&adc, channel::LIGHT), pins.sensors.lamp);
        let mut sensors = SensorFusion::new(presence, metal, weight, light, TimerDelay, &cfg);
        if !sensors.calibrate() {
            log::warn!("load cell tare failed; weights are uncalibrated");
        }

        // TIM3 servos
        let (intake_pwm, drop_pwm) =
            pwm::tim3_servo_pair(dp.TIM3, (pins.servos.intake, pins.servos.drop), &clocks);
        let lids = ServoLids::new(Servo::new(intake_pwm), Servo::new(drop_pwm), cfg.lids);

        // SPI1 RFID
        let mut rst = pins.rfid.rst;
        rst.set_high();
        let spi_mode = Mode {
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
        };
        let spi = Spi::new(dp.SPI1, (pins.rfid.sck, pins.rfid.miso, pins.rfid.mosi))
            .enable::<u8>(spi_mode, 1.MHz(), &clocks, &mut apb2);
        let mut card = Mfrc522::new(spi, pins.rfid.cs);
        if let Err(e) = card.init(&mut TimerDelay) {
            log::warn!("RFID reader init failed: {}", e);
        }

        // Coin hopper
        let mut syscfg = dp.SYSCFG;
        let mut exti = dp.EXTI;
        hopper::init(
            pins.hopper.pulse,
            PulseGate::new(cfg.dispense.pulse_debounce_ms),
            &mut syscfg,
            &mut exti,
            &mut apb2,
        );
        unsafe { pac::NVIC::unmask(pac::Interrupt::EXTI9_5) };
        let coin_hopper = Hopper::new(pins.hopper.relay);

        // Fill level and SMS alerts
        let gsm_cfg = Config {
            baud_rate: 9_600.bps(),
            ..Default::default()
        };
        let gsm_serial = Serial::new(dp.USART2, (pins.gsm.tx, pins.gsm.rx), &clocks, gsm_cfg);
        let modem = Sim800l::new(gsm_serial, clock::now_ms, &cfg.alert);
        let sonar = HcSr04::new(pins.sonar.trig, pins.sonar.echo, TimerDelay, clock::now_us);
        let monitor = FillMonitor::new(sonar, modem, TimerDelay, cfg.fill, cfg.alert);

        let mut machine = Machine::new(
            cfg,
            Parts {
                sensors,
                lids,
                display: lcd,
                status,
                panel: PinButtons::new(pins.buttons.up, pins.buttons.down, pins.buttons.select),
                card,
                hopper: coin_hopper,
                monitor,
            },
        );
        log::info!("ready");

        loop {
            machine.tick(clock::now_ms());
        }
    }

    #[exception]
    fn SysTick() {
        clock::on_systick();
    }

    #[interrupt]
    fn EXTI9_5() {
        hopper::on_pulse();
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
