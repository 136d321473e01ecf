use crate::error::Error;

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/rom.vhd");

const ROM_TOP: &str = "%ROM_TOP%";
const ADDR_TOP: &str = "%ADDR_TOP%";
const ROM_DATA: &str = "%ROM_DATA%";

const BYTES_PER_LINE: usize = 8;

/// Fill the HDL template with the ROM image.
pub fn render(template: &str, rom: &[u8]) -> Result<String, Error> {
    for placeholder in [ROM_TOP, ADDR_TOP, ROM_DATA] {
        if !template.contains(placeholder) {
            return Err(Error::Template(placeholder));
        }
    }
    Ok(template
        .replace(ROM_TOP, &(rom.len() as i64 - 1).to_string())
        .replace(ADDR_TOP, &(addr_bits(rom.len()) as i64 - 1).to_string())
        .replace(ROM_DATA, &rom_data(rom)))
}

/// ceil(log2(len))
fn addr_bits(len: usize) -> u32 {
    match len {
        0 => 0,
        n => usize::BITS - (n - 1).leading_zeros(),
    }
}

fn rom_data(rom: &[u8]) -> String {
    rom.chunks(BYTES_PER_LINE)
        .map(|chunk| {
            chunk
                .iter()
                .map(|b| format!("x\"{:02X}\"", b))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join(",\n    ")
}
