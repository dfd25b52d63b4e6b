//! Curated large-cap seed list.

use super::model::NewEntity;

/// (symbol, name, sector, industry, exchange, market cap in USD)
const SEEDS: &[(&str, &str, &str, &str, &str, i64)] = &[
    ("AAPL", "Apple Inc.", "Technology", "Consumer Electronics", "NASDAQ", 3_000_000_000_000),
    ("MSFT", "Microsoft Corporation", "Technology", "Software", "NASDAQ", 2_800_000_000_000),
    ("GOOGL", "Alphabet Inc.", "Technology", "Internet Services", "NASDAQ", 1_600_000_000_000),
    ("AMZN", "Amazon.com Inc.", "Consumer Discretionary", "E-commerce", "NASDAQ", 1_500_000_000_000),
    ("META", "Meta Platforms Inc.", "Technology", "Social Media", "NASDAQ", 800_000_000_000),
    ("NVDA", "NVIDIA Corporation", "Technology", "Semiconductors", "NASDAQ", 1_100_000_000_000),
    ("TSLA", "Tesla Inc.", "Consumer Discretionary", "Electric Vehicles", "NASDAQ", 800_000_000_000),
    ("NFLX", "Netflix Inc.", "Communication Services", "Streaming", "NASDAQ", 170_000_000_000),
    ("JPM", "JPMorgan Chase & Co.", "Financial Services", "Banking", "NYSE", 420_000_000_000),
    ("BAC", "Bank of America Corporation", "Financial Services", "Banking", "NYSE", 280_000_000_000),
    ("WFC", "Wells Fargo & Company", "Financial Services", "Banking", "NYSE", 180_000_000_000),
    ("GS", "The Goldman Sachs Group Inc.", "Financial Services", "Investment Banking", "NYSE", 120_000_000_000),
    ("MS", "Morgan Stanley", "Financial Services", "Investment Banking", "NYSE", 140_000_000_000),
    ("AXP", "American Express Company", "Financial Services", "Credit Services", "NYSE", 150_000_000_000),
    ("V", "Visa Inc.", "Financial Services", "Payment Processing", "NYSE", 520_000_000_000),
    ("MA", "Mastercard Incorporated", "Financial Services", "Payment Processing", "NYSE", 390_000_000_000),
    ("UNH", "UnitedHealth Group Inc.", "Healthcare", "Health Insurance", "NYSE", 480_000_000_000),
    ("JNJ", "Johnson & Johnson", "Healthcare", "Pharmaceuticals", "NYSE", 420_000_000_000),
    ("PFE", "Pfizer Inc.", "Healthcare", "Pharmaceuticals", "NYSE", 220_000_000_000),
    ("ABBV", "AbbVie Inc.", "Healthcare", "Pharmaceuticals", "NYSE", 290_000_000_000),
    ("MRK", "Merck & Co. Inc.", "Healthcare", "Pharmaceuticals", "NYSE", 280_000_000_000),
    ("TMO", "Thermo Fisher Scientific Inc.", "Healthcare", "Life Sciences Tools", "NYSE", 210_000_000_000),
    ("ABT", "Abbott Laboratories", "Healthcare", "Medical Devices", "NYSE", 180_000_000_000),
    ("WMT", "Walmart Inc.", "Consumer Staples", "Retail", "NYSE", 530_000_000_000),
    ("PG", "Procter & Gamble Company", "Consumer Staples", "Consumer Products", "NYSE", 380_000_000_000),
    ("KO", "The Coca-Cola Company", "Consumer Staples", "Beverages", "NYSE", 260_000_000_000),
    ("PEP", "PepsiCo Inc.", "Consumer Staples", "Beverages", "NASDAQ", 240_000_000_000),
    ("COST", "Costco Wholesale Corporation", "Consumer Staples", "Retail", "NASDAQ", 320_000_000_000),
    ("HD", "The Home Depot Inc.", "Consumer Discretionary", "Home Improvement", "NYSE", 380_000_000_000),
    ("MCD", "McDonald's Corporation", "Consumer Discretionary", "Restaurants", "NYSE", 200_000_000_000),
    ("NKE", "NIKE Inc.", "Consumer Discretionary", "Apparel", "NYSE", 180_000_000_000),
    ("SBUX", "Starbucks Corporation", "Consumer Discretionary", "Restaurants", "NASDAQ", 110_000_000_000),
    ("BA", "The Boeing Company", "Industrials", "Aerospace", "NYSE", 150_000_000_000),
    ("CAT", "Caterpillar Inc.", "Industrials", "Construction Equipment", "NYSE", 160_000_000_000),
    ("GE", "General Electric Company", "Industrials", "Conglomerate", "NYSE", 180_000_000_000),
    ("MMM", "3M Company", "Industrials", "Industrial Conglomerate", "NYSE", 70_000_000_000),
    ("HON", "Honeywell International Inc.", "Industrials", "Conglomerate", "NASDAQ", 140_000_000_000),
    ("UPS", "United Parcel Service Inc.", "Industrials", "Logistics", "NYSE", 130_000_000_000),
    ("RTX", "Raytheon Technologies Corporation", "Industrials", "Aerospace & Defense", "NYSE", 140_000_000_000),
    ("XOM", "Exxon Mobil Corporation", "Energy", "Oil & Gas", "NYSE", 450_000_000_000),
    ("CVX", "Chevron Corporation", "Energy", "Oil & Gas", "NYSE", 280_000_000_000),
    ("COP", "ConocoPhillips", "Energy", "Oil & Gas", "NYSE", 140_000_000_000),
    ("SLB", "Schlumberger Limited", "Energy", "Oil Services", "NYSE", 60_000_000_000),
    ("NEE", "NextEra Energy Inc.", "Utilities", "Electric Utilities", "NYSE", 150_000_000_000),
    ("DUK", "Duke Energy Corporation", "Utilities", "Electric Utilities", "NYSE", 80_000_000_000),
    ("VZ", "Verizon Communications Inc.", "Communication Services", "Telecommunications", "NYSE", 170_000_000_000),
    ("T", "AT&T Inc.", "Communication Services", "Telecommunications", "NYSE", 120_000_000_000),
    ("CMCSA", "Comcast Corporation", "Communication Services", "Media", "NASDAQ", 180_000_000_000),
    ("DIS", "The Walt Disney Company", "Communication Services", "Entertainment", "NYSE", 200_000_000_000),
    ("AMT", "American Tower Corporation", "Real Estate", "REITs", "NYSE", 90_000_000_000),
    ("PLD", "Prologis Inc.", "Real Estate", "REITs", "NYSE", 100_000_000_000),
    ("CCI", "Crown Castle Inc.", "Real Estate", "REITs", "NYSE", 60_000_000_000),
    ("LIN", "Linde plc", "Materials", "Chemicals", "NYSE", 200_000_000_000),
    ("APD", "Air Products and Chemicals Inc.", "Materials", "Chemicals", "NYSE", 60_000_000_000),
    ("DOW", "Dow Inc.", "Materials", "Chemicals", "NYSE", 40_000_000_000),
    ("DD", "DuPont de Nemours Inc.", "Materials", "Chemicals", "NYSE", 30_000_000_000),
    ("CRM", "Salesforce Inc.", "Technology", "Software", "NYSE", 220_000_000_000),
    ("ORCL", "Oracle Corporation", "Technology", "Software", "NYSE", 320_000_000_000),
    ("IBM", "International Business Machines Corporation", "Technology", "Software", "NYSE", 130_000_000_000),
    ("INTC", "Intel Corporation", "Technology", "Semiconductors", "NASDAQ", 200_000_000_000),
    ("AMD", "Advanced Micro Devices Inc.", "Technology", "Semiconductors", "NASDAQ", 240_000_000_000),
    ("CSCO", "Cisco Systems Inc.", "Technology", "Networking", "NASDAQ", 200_000_000_000),
    ("ADBE", "Adobe Inc.", "Technology", "Software", "NASDAQ", 240_000_000_000),
    ("NOW", "ServiceNow Inc.", "Technology", "Software", "NYSE", 140_000_000_000),
    ("UBER", "Uber Technologies Inc.", "Technology", "Transportation", "NYSE", 120_000_000_000),
    ("SPOT", "Spotify Technology S.A.", "Communication Services", "Music Streaming", "NYSE", 50_000_000_000),
    ("GILD", "Gilead Sciences Inc.", "Healthcare", "Biotechnology", "NASDAQ", 80_000_000_000),
    ("AMGN", "Amgen Inc.", "Healthcare", "Biotechnology", "NASDAQ", 140_000_000_000),
    ("BIIB", "Biogen Inc.", "Healthcare", "Biotechnology", "NASDAQ", 40_000_000_000),
    ("REGN", "Regeneron Pharmaceuticals Inc.", "Healthcare", "Biotechnology", "NASDAQ", 90_000_000_000),
    ("ASML", "ASML Holding N.V.", "Technology", "Semiconductor Equipment", "NASDAQ", 300_000_000_000),
    ("TSM", "Taiwan Semiconductor Manufacturing Company", "Technology", "Semiconductors", "NYSE", 500_000_000_000),
    ("AVGO", "Broadcom Inc.", "Technology", "Semiconductors", "NASDAQ", 600_000_000_000),
    ("QCOM", "QUALCOMM Incorporated", "Technology", "Semiconductors", "NASDAQ", 190_000_000_000),
    ("TXN", "Texas Instruments Incorporated", "Technology", "Semiconductors", "NASDAQ", 170_000_000_000),
    ("BABA", "Alibaba Group Holding Limited", "Consumer Discretionary", "E-commerce", "NYSE", 200_000_000_000),
    ("SHOP", "Shopify Inc.", "Technology", "E-commerce Software", "NYSE", 80_000_000_000),
    ("SQ", "Block Inc.", "Technology", "Financial Technology", "NYSE", 40_000_000_000),
    ("PYPL", "PayPal Holdings Inc.", "Financial Services", "Payment Processing", "NASDAQ", 80_000_000_000),
    ("F", "Ford Motor Company", "Consumer Discretionary", "Automotive", "NYSE", 50_000_000_000),
    ("GM", "General Motors Company", "Consumer Discretionary", "Automotive", "NYSE", 60_000_000_000),
    ("RIVN", "Rivian Automotive Inc.", "Consumer Discretionary", "Electric Vehicles", "NASDAQ", 20_000_000_000),
    ("AAL", "American Airlines Group Inc.", "Industrials", "Airlines", "NASDAQ", 10_000_000_000),
    ("DAL", "Delta Air Lines Inc.", "Industrials", "Airlines", "NYSE", 30_000_000_000),
    ("UAL", "United Airlines Holdings Inc.", "Industrials", "Airlines", "NASDAQ", 25_000_000_000),
    ("EA", "Electronic Arts Inc.", "Communication Services", "Gaming", "NASDAQ", 40_000_000_000),
    ("ATVI", "Activision Blizzard Inc.", "Communication Services", "Gaming", "NASDAQ", 60_000_000_000),
    ("TTWO", "Take-Two Interactive Software Inc.", "Communication Services", "Gaming", "NASDAQ", 25_000_000_000),
];

/// The seed list as insertable rows.
pub fn default_seeds() -> Vec<NewEntity> {
    SEEDS
        .iter()
        .map(|(symbol, name, sector, industry, exchange, market_cap)| NewEntity {
            symbol: symbol.to_string(),
            name: name.to_string(),
            sector: Some(sector.to_string()),
            industry: Some(industry.to_string()),
            exchange: Some(exchange.to_string()),
            market_cap: Some(*market_cap),
        })
        .collect()
}
