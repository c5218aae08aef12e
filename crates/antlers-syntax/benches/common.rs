// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_template(size: usize) -> String {
    let base = "<article>\n  <h2>{{ title | upper }}</h2>\n  {{ if featured && stock > 0 }}<span>{{ price * 1.2 }}</span>{{ else }}<span>sold out</span>{{ /if }}\n  {{# reviewed #}}\n  {{ partial:card :item=entry show=true }}\n</article>\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_nested_loops(sections: usize, depth: usize) -> String {
    let mut content = String::new();

    for section in 0..sections {
        content.push_str(&format!("<h1>Section {}</h1>\n", section));
        content.push_str(&generate_nested_content(depth, 0));
        content.push('\n');
    }

    content
}

#[allow(dead_code)]
fn generate_nested_content(remaining_depth: usize, level: usize) -> String {
    if remaining_depth == 0 {
        return "{{ title }}\n".to_string();
    }

    let mut content = String::new();
    content.push_str(&format!("{{{{ collection:level_{} limit=\"3\" }}}}\n", level));
    content.push_str(&format!("<li>{{{{ title | truncate({}) }}}}</li>\n", 10 + level));
    content.push_str(&generate_nested_content(remaining_depth - 1, level + 1));
    content.push_str(&format!("{{{{ /collection:level_{} }}}}\n", level));
    content
}

#[allow(dead_code)]
pub fn generate_expression_heavy(size: usize) -> String {
    let base = "{{ total = (price + tax) * quantity - discount ?? 0; label = total > 100 ? 'big' : 'small'; }}\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_broken_template(size: usize) -> String {
    let base = "<p>{{ a + }}{{ /unless }}{{ if }}x{{ /if }}{{ title | }}{{ collection:x }}y{{ /collection:z }}</p>\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_unclosed_openers(size: usize) -> String {
    let base = "<p>{{# {{!-- {{? {{$ {{ </p>\n";
    base.repeat(size)
}
