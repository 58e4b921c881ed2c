use embedded_hal_async::i2c::{ErrorType, I2c, SevenBitAddress};

/// Error type of the bus handed out by a [`BusProvider`].
pub type BusError<P> = <<P as BusProvider>::Bus as ErrorType>::Error;

/// Source of the I2C bus the sensor talks over.
///
/// The sensor opens its bus when it is enabled and hands it back when it is
/// disabled, so it never holds the bus while in shutdown. On Linux an
/// implementation would typically open `/dev/i2c-<bus_number>`; on a
/// microcontroller it can simply hand out an owned peripheral.
#[allow(async_fn_in_trait)]
pub trait BusProvider {
    /// The bus handle, exclusively owned by the sensor while it is open.
    type Bus: I2c<SevenBitAddress>;

    /// Opens the bus with the given number.
    async fn open(
        &mut self,
        bus_number: u8,
    ) -> Result<Self::Bus, <Self::Bus as ErrorType>::Error>;

    /// Closes a bus previously returned by [`open`](Self::open).
    async fn close(&mut self, bus: Self::Bus) -> Result<(), <Self::Bus as ErrorType>::Error>;
}
