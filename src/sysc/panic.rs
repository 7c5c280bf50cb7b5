use crate::os_error;
use core::panic::PanicInfo;

#[panic_handler]
fn handle_panic(info: &PanicInfo) -> ! {
    os_error!("====================[PANIC]====================");
    os_error!("Firmware paniced!");
    os_error!("Message: {}", info.message());
    match info.location() {
        Some(location) => os_error!(
            "Location: {}, line: {}, col: {}",
            location.file(),
            location.line(),
            location.column()
        ),
        None => os_error!("Location: N/A"),
    }
    os_error!("====================[PANIC]====================");

    super::xmc::park()
}
