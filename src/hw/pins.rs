// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin map for the PISO-BOTE controller on a Nucleo-F767ZI.

use stm32f7xx_hal::{
    gpio::{
        gpioa, gpiob, gpioc, gpiod, gpioe, gpiof, gpiog, Alternate, Analog, Floating, Input,
        OpenDrain, Output, PullUp, PushPull,
    },
    pac,
    prelude::*,
};

#[cfg(feature = "digital-presence")]
use stm32f7xx_hal::gpio::PullDown;

/// All board pins. Construct this once at startup using:
///
/// ```rust
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE, dp.GPIOF, dp.GPIOG);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub console: Usart3Pins,
    pub gsm: Usart2Pins,
    pub lcd: I2c1Pins,
    pub rfid: RfidPins,
    pub buttons: ButtonPins,
    pub sensors: SensorPins,
    pub sonar: SonarPins,
    pub servos: ServoPins,
    pub hopper: HopperPins,
}

/// On-board user LEDs
pub struct LedPins {
    pub green: gpiob::PB0<Output<PushPull>>, // LD1
    pub blue: gpiob::PB7<Output<PushPull>>,  // LD2
    pub red: gpiob::PB14<Output<PushPull>>,  // LD3
}

/// ST-LINK virtual COM port
pub struct Usart3Pins {
    pub tx: gpiod::PD8<Alternate<7>>,
    pub rx: gpiod::PD9<Alternate<7>>,
}

/// SIM800L modem
pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// PCF8574 LCD backpack
pub struct I2c1Pins {
    pub scl: gpiob::PB8<Alternate<4, OpenDrain>>,
    pub sda: gpiob::PB9<Alternate<4, OpenDrain>>,
}

/// MFRC522 on SPI1
pub struct RfidPins {
    pub sck: gpioa::PA5<Alternate<5>>,
    pub miso: gpioa::PA6<Alternate<5>>,
    pub mosi: gpioa::PA7<Alternate<5>>,
    pub cs: gpiod::PD14<Output<PushPull>>,
    pub rst: gpiof::PF12<Output<PushPull>>,
}

/// Up/Down/Select, active low
pub struct ButtonPins {
    pub up: gpiof::PF13<Input<PullUp>>,
    pub down: gpiof::PF14<Input<PullUp>>,
    pub select: gpiof::PF15<Input<PullUp>>,
}

/// Deposit chamber sensors
pub struct SensorPins {
    #[cfg(not(feature = "digital-presence"))]
    pub presence: gpioa::PA3<Analog>, // ADC1_IN3
    #[cfg(feature = "digital-presence")]
    pub presence: gpioa::PA3<Input<PullDown>>,
    pub light: gpioc::PC0<Analog>, // ADC1_IN10
    pub lamp: gpioe::PE4<Output<PushPull>>,
    pub metal: gpiog::PG0<Input<PullUp>>,
    pub hx711_dout: gpioe::PE2<Input<Floating>>,
    pub hx711_sck: gpioe::PE3<Output<PushPull>>,
}

/// HC-SR04 above the storage bin
pub struct SonarPins {
    pub trig: gpioe::PE5<Output<PushPull>>,
    pub echo: gpioe::PE6<Input<Floating>>,
}

/// TIM3 CH1/CH2
pub struct ServoPins {
    pub intake: gpiob::PB4<Alternate<2>>,
    pub drop: gpiob::PB5<Alternate<2>>,
}

pub struct HopperPins {
    pub pulse: gpioe::PE9<Input<PullUp>>, // EXTI9
    pub relay: gpioe::PE10<Output<PushPull>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(
        gpioa: pac::GPIOA,
        gpiob: pac::GPIOB,
        gpioc: pac::GPIOC,
        gpiod: pac::GPIOD,
        gpioe: pac::GPIOE,
        gpiof: pac::GPIOF,
        gpiog: pac::GPIOG,
    ) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();
        let gpiof = gpiof.split();
        let gpiog = gpiog.split();

        Self {
            leds: LedPins {
                green: gpiob.pb0.into_push_pull_output(),
                blue: gpiob.pb7.into_push_pull_output(),
                red: gpiob.pb14.into_push_pull_output(),
            },

            console: Usart3Pins {
                tx: gpiod.pd8.into_alternate::<7>(),
                rx: gpiod.pd9.into_alternate::<7>(),
            },

            gsm: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            lcd: I2c1Pins {
                scl: gpiob.pb8.into_alternate_open_drain::<4>(),
                sda: gpiob.pb9.into_alternate_open_drain::<4>(),
            },

            rfid: RfidPins {
                sck: gpioa.pa5.into_alternate::<5>(),
                miso: gpioa.pa6.into_alternate::<5>(),
                mosi: gpioa.pa7.into_alternate::<5>(),
                cs: gpiod.pd14.into_push_pull_output(),
                rst: gpiof.pf12.into_push_pull_output(),
            },

            buttons: ButtonPins {
                up: gpiof.pf13.into_pull_up_input(),
                down: gpiof.pf14.into_pull_up_input(),
                select: gpiof.pf15.into_pull_up_input(),
            },

            sensors: SensorPins {
                #[cfg(not(feature = "digital-presence"))]
                presence: gpioa.pa3.into_analog(),
                #[cfg(feature = "digital-presence")]
                presence: gpioa.pa3.into_pull_down_input(),
                light: gpioc.pc0.into_analog(),
                lamp: gpioe.pe4.into_push_pull_output(),
                metal: gpiog.pg0.into_pull_up_input(),
                hx711_dout: gpioe.pe2.into_floating_input(),
                hx711_sck: gpioe.pe3.into_push_pull_output(),
            },

            sonar: SonarPins {
                trig: gpioe.pe5.into_push_pull_output(),
                echo: gpioe.pe6.into_floating_input(),
            },

            servos: ServoPins {
                intake: gpiob.pb4.into_alternate::<2>(),
                drop: gpiob.pb5.into_alternate::<2>(),
            },

            hopper: HopperPins {
                pulse: gpioe.pe9.into_pull_up_input(),
                relay: gpioe.pe10.into_push_pull_output(),
            },
        }
    }
}
