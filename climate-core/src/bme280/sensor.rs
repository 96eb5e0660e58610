use super::{
    compensate_humidity, compensate_temperature, Calibration, Config, Error, FineTemperature,
    Humidity, Measurement, Temperature, BME280_CHIPID, BME280_REGISTER_CHIPID,
    BME280_REGISTER_CTRL_HUM, BME280_REGISTER_CTRL_MEAS, BME280_REGISTER_HUMIDDATA,
    BME280_REGISTER_TEMPDATA,
};
use crate::twi::RegisterBus;

/// A BME280 whose calibration has not been read yet.
///
/// The bus is borrowed per call so it can be shared with other devices.
#[derive(Debug, Clone, Copy)]
pub struct Sensor {
    config: Config,
}

impl Sensor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn chipid<B: RegisterBus>(&self, bus: &mut B) -> Result<u8, B::Error> {
        bus.read8(self.config.address, BME280_REGISTER_CHIPID)
    }

    /// Check the chip id, load the calibration coefficients and start measuring.
    ///
    /// `ctrl_hum` only takes effect after a write to `ctrl_meas`, so both go out in one
    /// transaction in that order.
    pub fn init<B: RegisterBus>(&self, bus: &mut B) -> Result<ReadySensor, Error<B::Error>> {
        let chipid = self.chipid(bus)?;
        if chipid != BME280_CHIPID {
            error!("BME280 chipid mismatch: {:#x}", chipid);
            return Err(Error::UnsupportedChip(chipid));
        }

        let calibration = Calibration::load(bus, self.config.address)?;
        debug!("Calibration Coefficients: {:?}", calibration);

        bus.write_bytes(
            self.config.address,
            &[
                BME280_REGISTER_CTRL_HUM,
                self.config.ctrl_hum,
                BME280_REGISTER_CTRL_MEAS,
                self.config.ctrl_meas,
            ],
        )?;
        Ok(ReadySensor::new(self.config, calibration))
    }
}

/// A BME280 with its calibration loaded; the only way to take readings.
#[derive(Debug, Clone, Copy)]
pub struct ReadySensor {
    config: Config,
    calibration: Calibration,
}

impl ReadySensor {
    pub fn new(config: Config, calibration: Calibration) -> Self {
        Self {
            config,
            calibration,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Burst-read the 20-bit temperature code and compensate it.
    pub fn read_temperature<B: RegisterBus>(&self, bus: &mut B) -> Result<Temperature, B::Error> {
        let adc_t = bus.read24(self.config.address, BME280_REGISTER_TEMPDATA)? >> 4;
        let temperature = compensate_temperature(adc_t, &self.calibration);
        trace!("adc_T {} -> {} cC", adc_t, temperature.centi_celsius);
        Ok(temperature)
    }

    /// Read the humidity code and compensate it with `fine` from this cycle's
    /// [`read_temperature`](Self::read_temperature).
    pub fn read_humidity<B: RegisterBus>(
        &self,
        bus: &mut B,
        fine: FineTemperature,
    ) -> Result<Humidity, B::Error> {
        let adc_h = bus.read16(self.config.address, BME280_REGISTER_HUMIDDATA)?;
        let humidity = compensate_humidity(
            adc_h,
            fine,
            &self.calibration,
            self.config.humidity_formula,
        );
        trace!("adc_H {} -> {} %rH", adc_h, humidity.percent());
        Ok(humidity)
    }

    /// Temperature, then humidity compensated with that temperature.
    pub fn measure<B: RegisterBus>(&self, bus: &mut B) -> Result<Measurement, B::Error> {
        let temperature = self.read_temperature(bus)?;
        let humidity = self.read_humidity(bus, temperature.fine)?;
        Ok(Measurement {
            temperature,
            humidity,
        })
    }
}
