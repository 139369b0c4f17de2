use crate::{ChannelLink, Verdict};

/// Classified links split by verdict. Header lines belong to the smooth list only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub headers: Vec<String>,
    pub smooth: Vec<ChannelLink>,
    pub bad: Vec<ChannelLink>,
}

/// Routes each link by its verdict, keeping the order in which verdicts arrived.
pub fn partition(
    headers: Vec<String>,
    classified: impl IntoIterator<Item = (ChannelLink, Verdict)>,
) -> Partition {
    let mut out = Partition {
        headers,
        ..Partition::default()
    };
    for (link, verdict) in classified {
        if verdict.passed {
            out.smooth.push(link);
        } else {
            out.bad.push(link);
        }
    }
    out
}

/// Header lines verbatim, one separating blank line, then the smooth links.
pub fn render_smooth(partition: &Partition) -> String {
    let mut headers: &[String] = &partition.headers;
    while let Some((last, rest)) = headers.split_last() {
        if !last.is_empty() {
            break;
        }
        headers = rest;
    }

    let mut out = String::new();
    for line in headers {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    push_links(&mut out, &partition.smooth);
    out
}

/// Failed links only, no headers.
pub fn render_bad(partition: &Partition) -> String {
    let mut out = String::new();
    push_links(&mut out, &partition.bad);
    out
}

fn push_links(out: &mut String, links: &[ChannelLink]) {
    for link in links {
        out.push_str(&link.to_string());
        out.push('\n');
    }
}
