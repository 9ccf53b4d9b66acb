// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markup(sections: usize) -> String {
    let base = "<h2 style=\"text-align: center\">Section</h2>\
        <p>Paragraph with <b>bold <i>and italic</i></b> text and a \
        <a href=\"https://example.com\">link</a>.</p>\
        <ul><li>first<ul><li>nested</li></ul></li><li>second</li></ul>\
        <blockquote><p><span style=\"color: red; font-size: 12px\">quoted</span></p></blockquote>";
    base.repeat(sections)
}

#[allow(dead_code)]
pub fn generate_messy_markup(sections: usize) -> String {
    let base = "<div><b><p>bold para</p></b><font color=red>old</font>\
        <table><tr><td>cell</td></tr></table><script>x()</script>\
        <p style=\"margin-left: 80px\">deep<br><br></p><i><b>a</b></i><b><i>b</i></b></div>";
    base.repeat(sections)
}
