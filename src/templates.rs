//! Sample documents for testing and demonstration.
//!
//! Each template exercises different instructions and styles.

/// Invoice with a class block, header box and a price table.
pub fn invoice_template() -> &'static str {
    r##"<?xml version="1.0" encoding="UTF-8"?>
<document>
  <meta>
    <author>Acme Corp</author>
    <creator>typeset</creator>
    <subject>Invoice 2024-001</subject>
  </meta>
  <default>
    <orientation>portrait</orientation>
    <unit>mm</unit>
    <format>a4</format>
    <page-breaks>auto</page-breaks>
    <page-margins><left>15</left><top>15</top><right>15</right><bottom>15</bottom></page-margins>
  </default>
  <style>
    title { font-size: 20; font-weight: bold; color: #1a365d; }
    address { border: 0, 0, 0, 0; padding: 0, 1, 0, 1; width: 80; }
    head { font-weight: bold; background-color: #e2e8f0; }
    num { h-align: right; column-width: 30; }
    total { h-align: right; font-weight: bold; border: 0, 1, 0, 0; }
  </style>
  <body>
    <Text class="title">Invoice #2024-001</Text>
    <Lf/>
    <Box class="address">**From:**\ Acme Corp\ 123 Business St\ New York, NY 10001</Box>
    <Box class="address" style="offset-x: 100; offset-y: -20">**To:**\ Client Inc\ 456 Client Ave</Box>
    <Lf lines="2"/>
    <table>
      <tr class="head"><td>Item</td><td class="num">Qty</td><td class="num">Price</td><td class="num">Total</td></tr>
      <tr><td>Web Development</td><td class="num">40</td><td class="num">$150.00</td><td class="num">$6,000.00</td></tr>
      <tr><td>Design Services</td><td class="num">20</td><td class="num">$125.00</td><td class="num">$2,500.00</td></tr>
      <tr><td>Hosting (Annual)</td><td class="num">1</td><td class="num">$500.00</td><td class="num">$500.00</td></tr>
    </table>
    <Lf/>
    <Box class="total">Total: $9,000.00</Box>
  </body>
</document>
"##
}

/// Long report with a header, a footer carrying page tokens, and enough
/// body text to span several pages.
pub fn report_template() -> &'static str {
    r##"<?xml version="1.0" encoding="UTF-8"?>
<document>
  <meta><subject>Annual Report</subject></meta>
  <style>
    header { font-size: 9; color: #555555; h-align: right; }
    footer { font-size: 9; h-align: center; }
    chapter { font-size: 16; font-weight: bold; }
    para { line-height: 1.4; }
  </style>
  <header>
    <Text class="header">Annual Report 2024</Text>
  </header>
  <footer>
    <SetY y="12" from-bottom="true"/>
    <Text class="footer">Page {current-page} of {total-pages}</Text>
  </footer>
  <body>
    <Text class="chapter">1. Executive Summary</Text>
    <Text class="para">This year was marked by *steady* growth across all regions. Revenue grew by **12 percent** while operating costs stayed flat. The following sections describe the results per business unit in detail, along with the outlook for the coming year and the risks identified by the board.</Text>
    <Lf/>
    <Text class="para">Our engineering teams shipped three major releases. The `sync` service now handles twice the load on the same hardware, and the new storage tier reduced latency for the largest customers. Customer satisfaction remained high, with most support tickets resolved within a single business day.</Text>
    <Lf/>
    <Text class="chapter">2. Regional Results</Text>
    <Text class="para">North America contributed the largest share of revenue. Europe grew fastest, driven by new partnerships in the logistics sector. Asia-Pacific remained stable, with growth expected once the regional data centre opens next spring. Each region is discussed below with its key figures and initiatives.</Text>
    <Lf/>
    <Text class="para">North America: revenue up 9 percent, two new offices, a refreshed partner programme and a dedicated enterprise sales team. Europe: revenue up 21 percent, onboarding of five logistics partners, compliance work for new data-residency rules. Asia-Pacific: revenue up 4 percent, preparation of the regional data centre, hiring of a local support team.</Text>
    <Lf/>
    <Text class="chapter">3. Financial Statements</Text>
    <Text class="para">The consolidated statements were audited without qualification. Cash reserves cover more than eighteen months of operating expenses. Capital expenditure focused on infrastructure, with a smaller share going to office space. Deferred revenue increased in line with the shift to annual subscriptions.</Text>
    <Lf/>
    <Text class="para">Liquidity remained strong throughout the year. No new debt was raised; the existing credit facility was extended on unchanged terms. Dividends were paid in two instalments. Share buybacks were paused to preserve flexibility for acquisitions in the next fiscal year.</Text>
    <Lf/>
    <Text class="chapter">4. Outlook</Text>
    <Text class="para">For the coming year we expect revenue growth between 8 and 11 percent. Investment will focus on the storage tier, the regional data centre and the partner programme. Risks include currency fluctuations, longer enterprise sales cycles and the competitive pressure in the mid-market segment.</Text>
    <Lf/>
    <Text class="para">The board thanks all employees, customers and partners for their continued trust. We look forward to reporting on our progress at the next general meeting.</Text>
    <Lf/>
    <Text class="chapter">Appendix: Glossary</Text>
    <Text class="para">ARR: annual recurring revenue. Churn: share of customers not renewing. NPS: net promoter score. Opex: operating expenses. Capex: capital expenditure. Tier: a class of storage with a given price and latency profile. Region: a group of countries served by one data centre and one sales organisation.</Text>
    <Lf/>
    <Text class="para">ARR: annual recurring revenue. Churn: share of customers not renewing. NPS: net promoter score. Opex: operating expenses. Capex: capital expenditure. Tier: a class of storage with a given price and latency profile. Region: a group of countries served by one data centre and one sales organisation.</Text>
    <Lf/>
    <Text class="para">ARR: annual recurring revenue. Churn: share of customers not renewing. NPS: net promoter score. Opex: operating expenses. Capex: capital expenditure. Tier: a class of storage with a given price and latency profile. Region: a group of countries served by one data centre and one sales organisation.</Text>
    <Lf lines="40"/>
    <Text class="chapter">Appendix: Contacts</Text>
    <Text class="para">Investor relations, press office and general enquiries are reachable through the company website.</Text>
  </body>
</document>
"##
}

/// Table with row and column spans, first/last selectors and vertical
/// alignment.
pub fn span_table_template() -> &'static str {
    r##"<?xml version="1.0" encoding="UTF-8"?>
<document>
  <default><unit>mm</unit></default>
  <style>
    cell { padding: 2, 2, 2, 2; }
    cell:first { padding: 2, 2, 2, 2; font-weight: bold; background-color: #eeeeee; }
    row:first { font-weight: bold; background-color: #dddddd; }
    row:last { font-style: italic; }
    group { v-align: middle; h-align: center; }
  </style>
  <body>
    <table>
      <tr class="row"><td class="cell">Region</td><td class="cell">Quarter</td><td class="cell">Revenue</td></tr>
      <tr><td class="cell group" style="row-span: 2">North</td><td class="cell">Q1</td><td class="cell">120</td></tr>
      <tr><td class="cell">Q2</td><td class="cell">135</td></tr>
      <tr><td class="cell group" style="row-span: 2">South</td><td class="cell">Q1</td><td class="cell">80</td></tr>
      <tr><td class="cell">Q2</td><td class="cell">95</td></tr>
      <tr class="row"><td class="cell" style="column-span: 2; h-align: right">Total</td><td class="cell">430</td></tr>
    </table>
  </body>
</document>
"##
}

/// Inline emphasis, code spans and forced line breaks.
pub fn markdown_template() -> &'static str {
    r##"<?xml version="1.0" encoding="UTF-8"?>
<document>
  <body>
    <Text>*some* tricky `__ways__` to cut-off your tail\</Text>
    <Text style="h-align: center">**Centered bold** with _italic_ words\ and a forced break</Text>
    <Text style="h-align: right; font-decoration: underline">underlined and right aligned</Text>
    <Box style="width: 60; background-color: #fff3cd; border: 1, 1, 1, 1">A box with `code` inside</Box>
  </body>
</document>
"##
}

/// Smallest valid document.
pub fn minimal_template() -> &'static str {
    "<document><body><Text>Hello, World!</Text></body></document>"
}

/// Every bundled template with its name.
pub fn all() -> Vec<(&'static str, &'static str)> {
    vec![
        ("invoice", invoice_template()),
        ("report", report_template()),
        ("span-table", span_table_template()),
        ("markdown", markdown_template()),
        ("minimal", minimal_template()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn templates_load() {
        for (name, xml) in all() {
            let doc = Document::load(xml).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(!doc.body.is_empty(), "{name} has an empty body");
        }
    }

    #[test]
    fn report_has_header_and_footer() {
        let doc = Document::load(report_template()).unwrap();
        assert_eq!(doc.header.len(), 1);
        assert_eq!(doc.footer.len(), 2);
        assert_eq!(doc.meta.subject, "Annual Report");
    }
}
