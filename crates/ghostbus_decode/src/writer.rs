//! Indented Verilog text builder and literal helpers.

/// Accumulates generated Verilog one line at a time.
#[derive(Debug, Default)]
pub struct VerilogWriter {
    out: String,
    depth: usize,
}

impl VerilogWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Appends a `//` comment line.
    pub fn comment(&mut self, text: impl AsRef<str>) {
        self.line(format!("// {}", text.as_ref()));
    }

    /// Appends a line, then indents what follows.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedents, then appends a line.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// The accumulated text.
    pub fn finish(self) -> String {
        self.out
    }
}

/// A sized hex literal such as `8'h0f`.
pub fn vhex(value: u64, width: u32) -> String {
    let width = width.max(1);
    let digits = width.div_ceil(4) as usize;
    format!("{width}'h{value:0digits$x}")
}

/// `net[hi:lo]`.
pub fn slice(net: &str, hi: u32, lo: u32) -> String {
    format!("{net}[{hi}:{lo}]")
}

/// Widens `expr` (of `width` bits) to `target` bits, sign-extending from
/// `msb` when given.
pub fn extend(expr: &str, width: u32, target: u32, msb: Option<&str>) -> String {
    if width >= target {
        return expr.to_string();
    }
    let pad = target - width;
    match msb {
        Some(msb) => format!("{{{{{pad}{{{msb}}}}}, {expr}}}"),
        None => format!("{{{}, {expr}}}", vhex(0, pad)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_literals() {
        assert_eq!(vhex(0x1f, 8), "8'h1f");
        assert_eq!(vhex(1, 1), "1'h1");
        assert_eq!(vhex(5, 12), "12'h005");
        assert_eq!(vhex(0, 0), "1'h0");
        assert_eq!(vhex(2, 3), "3'h2");
    }

    #[test]
    fn indentation() {
        let mut w = VerilogWriter::new();
        w.open("always @(posedge clk) begin");
        w.line("a <= 1'b0;");
        w.close("end");
        assert_eq!(w.finish(), "always @(posedge clk) begin\n  a <= 1'b0;\nend\n");
    }

    #[test]
    fn zero_and_sign_extension() {
        assert_eq!(extend("ctrl", 8, 32, None), "{24'h000000, ctrl}");
        assert_eq!(extend("gain", 12, 16, Some("gain[11]")), "{{4{gain[11]}}, gain}");
        assert_eq!(extend("full", 32, 32, None), "full");
    }
}
