//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit for the CO channel and the companion
//! UART (TX only) using raw ESP-IDF sys calls.  Called once from `main()`
//! before the timers start.  GPIO outputs are owned by `esp-idf-hal` pin
//! drivers created in `main()`.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::SystemConfig;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    UartInitFailed(i32),
    GpioInitFailed,
    TimerInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::UartInitFailed(rc) => write!(f, "UART init failed (rc={})", rc),
            Self::GpioInitFailed => write!(f, "GPIO output driver init failed"),
            Self::TimerInitFailed(rc) => write!(f, "esp_timer setup failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("peripheral bring-up failed")
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(config: &SystemConfig) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the timers start; single-threaded.
    unsafe {
        init_adc()?;
        init_uart(config.uart_baud)?;
    }
    info!("hw_init: ADC + UART configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(config: &SystemConfig) -> Result<(), HwInitError> {
    log::info!(
        "hw_init(sim): peripheral init skipped (uart@{} baud)",
        config.uart_baud
    );
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: ADC1_HANDLE is written once by `init_adc()` before the
/// acquisition timer exists; afterwards it is only read, from the
/// esp_timer task.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), pins::CO_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 CH{} (GPIO{}) 12-bit", pins::CO_ADC_CHANNEL, pins::CO_ADC_GPIO);
    Ok(())
}

/// One blocking conversion on ADC1.  Returns the code unmasked so the
/// pipeline can flag anything wider than 12 bits, or the driver's return
/// code if the read failed.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; the acquisition timer is the only caller.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(ret);
    }
    Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
}

// ── UART (companion link, TX only) ────────────────────────────

/// RX ring buffer; the driver requires one larger than the hardware FIFO
/// even though nothing is ever received.
#[cfg(target_os = "espidf")]
const UART_RX_BUF: i32 = 256;

#[cfg(target_os = "espidf")]
unsafe fn init_uart(baud: u32) -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: baud as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    let port = pins::COMPANION_UART_PORT;

    let ret = unsafe { uart_param_config(port, &cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    let ret = unsafe {
        uart_set_pin(
            port,
            pins::COMPANION_UART_TX_GPIO,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
        )
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    // No TX ring buffer: uart_tx_chars() writes straight into the FIFO and
    // reports how many bytes fit, which is the ready flag we poll.
    let ret = unsafe { uart_driver_install(port, UART_RX_BUF, 0, 0, core::ptr::null_mut(), 0) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    let ret = unsafe { uart_disable_rx_intr(port) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }

    info!("hw_init: UART{} TX=GPIO{} @ {} baud", port, pins::COMPANION_UART_TX_GPIO, baud);
    Ok(())
}
