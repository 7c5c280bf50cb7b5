use std::{env, fs, path::PathBuf, process::Command};

/// Flash origin/length and RAM origin/length for each supported series.
const MEMORY_LAYOUTS: [(&str, u32, u32, u32, u32); 10] = [
    ("XMC1100", 0x1000_1000, 64 * 1024, 0x2000_0000, 16 * 1024),
    ("XMC1200", 0x1000_1000, 200 * 1024, 0x2000_0000, 16 * 1024),
    ("XMC1300", 0x1000_1000, 200 * 1024, 0x2000_0000, 16 * 1024),
    ("XMC1400", 0x1000_1000, 200 * 1024, 0x2000_0000, 16 * 1024),
    ("XMC4200", 0x0C00_0000, 256 * 1024, 0x2000_0000, 24 * 1024),
    ("XMC4300", 0x0C00_0000, 256 * 1024, 0x2000_0000, 64 * 1024),
    ("XMC4400", 0x0C00_0000, 512 * 1024, 0x2000_0000, 64 * 1024),
    ("XMC4500", 0x0C00_0000, 1024 * 1024, 0x2000_0000, 64 * 1024),
    ("XMC4700", 0x0C00_0000, 2048 * 1024, 0x2000_0000, 128 * 1024),
    ("XMC4800", 0x0C00_0000, 2048 * 1024, 0x2000_0000, 128 * 1024),
];

/// Used when no series feature is enabled, matching `Variant::selected()`.
const DEFAULT_SERIES: &str = "XMC4700";

/// Boot header at the start of XMC1 flash. The boot ROM reads the stack
/// pointer, the reset vector and the two clock words from it.
const XMC1_BOOT_HEADER: u32 = 0x40;

/// SRAM below the application on XMC1, holding the exception veneers.
/// Must match `sysc::veneer::WINDOW_END`.
const XMC1_VENEER_WINDOW: u32 = 0x200;

/// CLK_VAL1 and CLK_VAL2 at 0x1000_1010 and 0x1000_1014, the vendor start-up defaults.
const XMC1_CLKVAL: [u32; 2] = [0x0000_0100, 0x8000_0000];

fn main() {
    let git_hash = Command::new("git")
        .arg("rev-parse")
        .arg("--short")
        .arg("HEAD")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |hash| hash.trim().to_string());
    println!("cargo:rustc-env=XMCBOD_COMMIT={git_hash}");
    println!("cargo:rerun-if-changed=build.rs");

    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        write_memory_layout();
    }
}

fn write_memory_layout() {
    let series = MEMORY_LAYOUTS
        .iter()
        .find(|(name, ..)| env::var_os(format!("CARGO_FEATURE_{name}")).is_some())
        .or_else(|| {
            MEMORY_LAYOUTS
                .iter()
                .find(|(name, ..)| *name == DEFAULT_SERIES)
        })
        .expect("Default series missing from the memory layout table");

    let (name, flash_origin, flash_len, ram_origin, ram_len) = *series;
    let memory_x = if name.starts_with("XMC1") {
        xmc1_memory_layout(name, flash_origin, flash_len, ram_origin, ram_len)
    } else {
        format!(
            "/* {name} */\nMEMORY\n{{\n  FLASH : ORIGIN = {flash_origin:#010X}, LENGTH = {flash_len}\n  RAM : ORIGIN = {ram_origin:#010X}, LENGTH = {ram_len}\n}}\n"
        )
    };

    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is not set"));
    fs::write(out.join("memory.x"), memory_x).expect("Failed to write memory.x");
    println!("cargo:rustc-link-search={}", out.display());
}

/// XMC1 flash opens with the boot header, and cortex-m-rt's vector table follows
/// it. The bottom of SRAM is left to the veneers the board installs at start-up.
fn xmc1_memory_layout(
    name: &str,
    flash_origin: u32,
    flash_len: u32,
    ram_origin: u32,
    ram_len: u32,
) -> String {
    let [clkval1, clkval2] = XMC1_CLKVAL;
    let vectors = flash_origin + XMC1_BOOT_HEADER;
    let app_flash = flash_len - XMC1_BOOT_HEADER;
    let app_ram = ram_origin + XMC1_VENEER_WINDOW;
    let app_ram_len = ram_len - XMC1_VENEER_WINDOW;

    format!(
        "/* {name} */
MEMORY
{{
  BOOT : ORIGIN = {flash_origin:#010X}, LENGTH = {XMC1_BOOT_HEADER:#X}
  FLASH : ORIGIN = {vectors:#010X}, LENGTH = {app_flash}
  RAM : ORIGIN = {app_ram:#010X}, LENGTH = {app_ram_len}
}}

SECTIONS
{{
  .xmc1_boot_header ORIGIN(BOOT) :
  {{
    LONG(_stack_start);
    LONG(Reset | 1);
    LONG(0);
    LONG(0);
    LONG({clkval1:#010X});
    LONG({clkval2:#010X});
  }} > BOOT
}}
INSERT BEFORE .vector_table;
"
    )
}
